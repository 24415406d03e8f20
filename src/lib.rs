//! Audience Filters - a two-audience filter menu
//!
//! Audience Filters serves a pair of filter panels ("Audience A" and "Audience B") to a
//! browser. The filter logic lives in Rust and the page is plain HTML, connected by a JSON
//! protocol over WebSocket.
//!
//! # Architecture
//!
//! - **Presets** ([`presets`]): each variable maps preset names to either a set of values
//!   (discrete) or a `[min, max]` pair (continuous). Every variable defines an `"All"` preset.
//! - **Selectors** ([`selection`]): a preset radio group and a value control kept in sync.
//!   Choosing a preset sets the value; editing the value re-resolves the preset.
//! - **Summaries** ([`summary`]): one label per variable per audience. With "Not Audience A"
//!   checked, Audience B shows `NOT <Audience A's summary>`.
//! - **Menu** ([`menu`]): the per-session state machine over both audiences.
//! - **View and server** ([`view`], [`server`]): typed element ids, routing of browser
//!   events, and one session per WebSocket connection.
//!
//! # HTML Elements
//!
//! The page is built from these custom elements, all driven by `static/webui.js`:
//!
//! | Element               | [`UiElement`] variant        | Sends                        |
//! |-----------------------|------------------------------|------------------------------|
//! | `<ui-button>`         | [`UiElement::Button`]        | `click`                      |
//! | `<ui-text>`           | [`UiElement::Text`]          | nothing                      |
//! | `<ui-checkbox>`       | [`UiElement::Checkbox`]      | `change` with a bool         |
//! | `<ui-radio-group>`    | [`UiElement::RadioGroup`]    | `change` with the preset     |
//! | `<ui-multi-select>`   | [`UiElement::MultiSelect`]   | `change` with a string array |
//! | `<ui-range-slider>`   | [`UiElement::RangeSlider`]   | `change` with `[low, high]`  |
//! | `<ui-collapse>`       | [`UiElement::Collapse`]      | nothing                      |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use audience_filters::{Audience, Catalog, Event, FilterMenu, SelectorKey, VariableKind};
//!
//! let mut menu = FilterMenu::new(Arc::new(Catalog::demo()));
//! menu.handle(Event::SetNotAudienceA(true)).unwrap();
//!
//! let market_a = SelectorKey::new(Audience::A, VariableKind::Discrete, "Market");
//! menu.handle(Event::ChoosePreset { key: market_a, preset: "Europe".to_string() })
//!     .unwrap();
//!
//! let market_b = SelectorKey::new(Audience::B, VariableKind::Discrete, "Market");
//! assert_eq!(menu.variable(&market_b).unwrap().summary, "NOT Europe");
//! ```
//!
//! Serving the page:
//!
//! ```no_run
//! use audience_filters::{Catalog, RouterConfig, start_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RouterConfig::new(Catalog::demo()).title("My Filters");
//!     start_server(config, "127.0.0.1:3000").await.unwrap();
//! }
//! ```

pub mod element;
pub mod menu;
pub mod presets;
pub mod selection;
pub mod server;
pub mod summary;
pub mod view;

pub use element::{ClientMessage, ServerMessage, UiElement};
pub use menu::{Audience, Event, FilterMenu, MenuError, SelectorKey, Update};
pub use presets::{Catalog, ConfigError, Range, ValueSet, VariableKind};
pub use selection::{SelectionError, Selector};
pub use server::{AppState, RouterConfig, Session, create_router, start_server};
pub use view::{View, ViewError};
