//! Push notification handling: payload decoding, the foreground banner,
//! click routing and segmentation tags.

mod banner;
mod click;
mod decoder;
pub mod tags;

pub use banner::{BannerController, BannerState};
pub use click::{ClickAction, ClickRouter, NotificationClickEvent};
pub use decoder::{decode, DecodeError, DecodedNotification, RawNotification};
pub use tags::{AttributeTagger, HistoryDay, HistoryEntry};
