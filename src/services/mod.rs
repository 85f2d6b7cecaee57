// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod gemini;
pub mod google_oidc;
pub mod metrics;
pub mod nutrition;
pub mod password;
pub mod recipes;
pub mod reports;
pub mod subscription;

pub use gemini::{GeminiClient, GeneratedText, InlineImage};
pub use google_oidc::{GoogleIdTokenVerifier, OidcError, VerifiedGoogleIdentity};
pub use subscription::AccessState;
