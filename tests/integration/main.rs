//! End-to-end tests exercising the HTTP API against in-memory queue and
//! storage backends, with the worker pipelines driven inline.

mod helpers;

mod admin_test;
mod job_flow_test;
mod limits_test;
