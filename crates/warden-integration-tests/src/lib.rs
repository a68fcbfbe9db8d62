//! Integration tests for the warden workspace. See `tests/`.
