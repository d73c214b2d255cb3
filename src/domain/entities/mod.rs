//! Core business entities.

pub mod click;
pub mod link;
pub mod rule;
pub mod settings;

pub use click::{Click, NewClick};
pub use link::{FlagSetting, Link, LinkPatch, LinkStatus, NewLink, RedirectCode};
pub use rule::{Condition, DeviceClass, RangeOperator, Rule, SetOperator};
pub use settings::{GeolocationService, Settings};
