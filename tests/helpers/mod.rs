// ABOUTME: Test helper modules shared by the integration test suites
// ABOUTME: HTTP request helpers for driving Axum routers in-process

pub mod axum_test;
