pub mod backend_service;
pub mod readiness_service;
pub mod render_service;
pub mod scan_service;
pub mod session_service;
pub mod task_client;
