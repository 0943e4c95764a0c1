// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer
//!
//! - [`camera`]: Device enumeration and live streams (V4L2, still image)
//! - [`analysis`]: The remote image analysis endpoint

pub mod analysis;
pub mod camera;
