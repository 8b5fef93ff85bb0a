//! Folio - professional profile backend
//!
//! Users maintain educations, experiences, projects, solutions and skills in
//! two languages against shared company/school/skill catalogs. Access is
//! decided per request from role authorities with self/anyone scoping.
//! All modules are public for the integration tests.

pub mod authz;
pub mod entities;
pub mod errors;
pub mod files;
pub mod seed;
pub mod services;
pub mod session;
pub mod settings;
pub mod storage;
pub mod tokens;
pub mod web;
