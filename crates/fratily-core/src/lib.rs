//! # Fratily Core
//!
//! Core types for the Fratily request-handling kernel.
//!
//! This crate provides the types every other Fratily crate builds on:
//!
//! - [`Fault`] - The fault taxonomy and its HTTP status mapping
//! - [`Body`], [`Request`], [`Response`] - HTTP message types
//! - [`Container`] - Read-only service locator
//! - [`Action`], [`ParamSpec`], [`BindingPlan`] - Actions and argument binding
//! - [`ActionValue`] - Action return values and their coercion into responses
//! - [`Controller`] - The controller capability
//! - [`Params`] - Ordered action parameters
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/fratily-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod body;
mod context;
mod controller;
pub mod di;
mod error;
mod params;
pub mod status;
mod types;

pub use action::{
    Action, ActionArgs, ActionFuture, ActionValue, Arg, BindingPlan, BoxFuture, ParamSpec,
    PARAMS_PARAM, REQUEST_PARAM,
};
pub use body::Body;
pub use context::RequestId;
pub use controller::{ActionRef, Controller, MethodInfo, Visibility, ACTION_SEPARATOR};
pub use di::Container;
pub use error::{join_methods, ErrorDetail, ErrorEnvelope, Fault, FaultKind, FaultResult};
pub use params::Params;
pub use types::{ReasonPhrase, Request, RequestHead, Response, ResponseExt};
