// handlers/protected/mod.rs - Handlers behind the session gate
//
// Route prefix: /api/*
// Every handler takes a `CurrentUser` and scopes store access to that owner.

pub mod personnel;
pub mod profile;
pub mod resource;
