//! Inquiry data and its HTTP surface.
//!
//! ## Module Map
//!
//! ```text
//! ┌────────────┐  HTTP  ┌────────────────────────────────────────────┐
//! │ HttpSource │ ─────> │  server.rs  (axum Router, ServerConfig)    │
//! │ (board,    │ <───── │    └─ api.rs  (route handlers, AppState)   │
//! │  move)     │        │         │                                  │
//! └────────────┘        │         v                                  │
//!                       │  source.rs  (DataSource, InMemorySource)   │
//!                       └────────────────────────────────────────────┘
//! ```
//!
//! | Module   | Responsibility                                          |
//! |----------|---------------------------------------------------------|
//! | `models` | `Inquiry`, `Phase`, `ListFilters`                       |
//! | `source` | `DataSource` trait, in-memory and HTTP implementations  |
//! | `api`    | `/api/inquiries` handlers and `ApiError`                |
//! | `server` | Router assembly and graceful shutdown                   |

pub mod api;
pub mod models;
pub mod server;
pub mod source;
