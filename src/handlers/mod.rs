// Handlers are split by who may call them:
// public (no session needed) and protected (an identity from the session gate).
pub mod protected;
pub mod public;
