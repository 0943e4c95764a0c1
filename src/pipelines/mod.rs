// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines
//!
//! - [`photo`]: Turns a camera frame or a picked file into the image to submit

pub mod photo;
