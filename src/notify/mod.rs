pub mod telegram;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::Listing;

pub use telegram::TelegramNotifier;

/// Delivers one listing to a chat destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `Ok` means the messaging API confirmed delivery.
    async fn send(&self, listing: &Listing) -> Result<(), AppError>;
}
