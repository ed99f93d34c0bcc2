// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for FsPath normalization and manipulation

#![no_main]

use fsu_core::path::{FsPath, PathStyle};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for style in [PathStyle::Posix, PathStyle::Windows] {
        let Ok(path) = FsPath::normalize_with(input, style) else {
            continue;
        };

        // Normalizing the rendered form must give the same path back
        let again = FsPath::normalize_with(&path.to_string(), style)
            .expect("rendered path failed to normalize");
        assert_eq!(again, path);

        let _ = path.parent();
        let _ = path.file_name();
        let _ = path.extension();
        let _ = path.components().count();
        let _ = path.resolve_dots();

        if let Some((mid, _)) = input.char_indices().nth(input.chars().count() / 2) {
            let _ = path.join_str(&input[..mid]);
        }
    }
});
