pub mod app_state;
pub mod category_handlers;
pub mod feed;
pub mod field_map;
pub mod notifier;
pub mod product_handlers;
pub mod stock_handlers;

pub use app_state::AppState;
pub use common_http_errors::ApiError;

/// Stock thresholds applied when a create payload leaves them out.
pub const DEFAULT_MINIMUM_STOCK: i32 = 5;
pub const DEFAULT_MAXIMUM_STOCK: i32 = 100;
