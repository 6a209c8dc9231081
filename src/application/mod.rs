// Application layer - Use cases
pub mod controller;
pub mod dashboard_service;
pub mod map_builder;
pub mod summary_builder;
pub mod telemetry_repository;
pub mod time_series_builder;
