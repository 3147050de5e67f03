//! Booking.com 向けブラウザセッション
//!
//! Chrome を起動し、日付ごとに1ページ開いて本文と部屋ブロックを取り出す。

mod browser;

pub use browser::{snapshot_script, BookingBrowser};
