// handlers/public/mod.rs - Public handlers (no session required)
//
// Routes: /, /health, /api/health, /auth/*
// The session gate still runs in front of these, so a refreshed session
// reaches the browser even on public pages.

pub mod auth;
pub mod system;
