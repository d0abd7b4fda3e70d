pub mod analytics_service;
pub mod chat_service;
pub mod demo_data;
pub mod fitbit_service;
pub mod gemini_service;
pub mod minio_service;
pub mod scheduler;

pub use fitbit_service::FitbitService;
pub use gemini_service::GeminiService;
pub use minio_service::MinIOService;
pub use scheduler::SchedulerService;
