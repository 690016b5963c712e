// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the contact form relay.
//!
//! Provides submission payload builders, hostile input corpora, and
//! in-process stand-ins for the upstream email and captcha services.

pub mod generators;
pub mod upstream;
