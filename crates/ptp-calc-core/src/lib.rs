//! # PowerTunePro Calculator Core Library
//!
//! Request and synchronization core for the embeddable PowerTunePro
//! calculator widgets.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - A resilient request client that retries a warming-up backend and can
//!   be cancelled at any point
//! - The cross-frame message protocol that delivers an "original" widget's
//!   result to its "new" sibling as a baseline
//! - Baseline comparison with unit conversion between metric and imperial
//! - The cascading tire fitment resolver
//!
//! ## Calculators
//!
//! - Displacement (with compression ratio)
//! - Rod length / stroke (`rl`)
//! - Sprocket and chain
//! - Tires
//!
//! ## Example
//!
//! ```rust,ignore
//! use ptp_calc_core::prelude::*;
//!
//! let client = RequestClient::from_config(&ClientConfig::from_env()?)?;
//! let config = WidgetConfig::from_url("https://powertunepro.com/widgets/rl-original?pageId=p1")?;
//! let mut widget = Widget::new(config, Some("https://powertunepro.com/tools"));
//!
//! let request = widget
//!     .request_builder()
//!     .decimal_text("bore", "64")
//!     .decimal_text("stroke", "54")
//!     .decimal_text("rod_length", "110")
//!     .build();
//! let ticket = widget.begin_submission();
//! let outcome = client.submit(&request, ticket.token()).await;
//! for message in widget.complete_submission(ticket, outcome) {
//!     post_to_host(message.target_origin, message.message.to_json()?);
//! }
//! ```

pub mod calculator;
pub mod client;
pub mod comparison;
pub mod config;
pub mod fitment;
pub mod model;
pub mod sync;
pub mod units;
pub mod widget;

pub use calculator::Calculator;
pub use units::UnitSystem;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::calculator::{Calculator, ComparisonField, Storage};
    pub use crate::client::{
        HttpTransport, RequestClient, RetryPolicy, SubmitError, SubmitStatus, Transport,
    };
    pub use crate::comparison::{compare_for, Comparison, ComparisonLabels, FieldDelta};
    pub use crate::config::{ClientConfig, WidgetConfig, WidgetRole};
    pub use crate::fitment::{FitmentCatalog, FitmentResolver, VehicleType};
    pub use crate::model::{Baseline, CalcRequest, CalcResult, FieldErrors};
    pub use crate::sync::{FrameBridge, FrameMessage, Language, OriginAllowlist};
    pub use crate::units::{Quantity, UnitSystem};
    pub use crate::widget::{Notice, Widget};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
