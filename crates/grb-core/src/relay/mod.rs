//! The routing and pending-reply correlation engine.
//!
//! `forward` fans inbound traffic out to the administrators, `dispatch`
//! routes an administrator's reply back through their pending action, and
//! `control` turns a callback activation into a pending-store write.

pub mod control;
pub mod dispatch;
pub mod forward;
