mod cli;
mod infra;
mod interactive;
mod render;

use price_wizard::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
