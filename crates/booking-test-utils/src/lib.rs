//! # Booking Test Utilities
//!
//! Shared test utilities for the booking service.
//!
//! This crate provides:
//! - Server test harness (`TestBookingServer` for E2E tests)
//! - Class fixtures and direct database helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use booking_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> Result<()> {
//!     let class = insert_class(&pool, &class_fixture("Yoga", "Keneshia", 3, 24)).await?;
//!     let server = TestBookingServer::spawn(pool).await?;
//!
//!     let response = reqwest::Client::new()
//!         .post(format!("{}/book", server.url()))
//!         .json(&serde_json::json!({
//!             "class_id": class.class_id,
//!             "client_name": "Asha",
//!             "client_email": "asha@x.com",
//!         }))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 201);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod server_harness;

pub use fixtures::*;
pub use server_harness::*;
