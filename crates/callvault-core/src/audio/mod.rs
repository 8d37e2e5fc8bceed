mod backend;
mod capture;

pub use {
    backend::{CaptureBackend, CaptureHandle},
    capture::{CpalCaptureBackend, CpalCaptureHandle},
};
