// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pulmo::config::UploadConfig;
use pulmo::upload::{IncomingFile, UploadSurface};

#[derive(Arbitrary, Debug)]
struct Upload {
    name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

fuzz_target!(|uploads: Vec<Upload>| {
    let surface = UploadSurface::new(&UploadConfig { max_bytes: 4096 });
    let files = uploads.into_iter().map(|u| IncomingFile {
        name: u.name,
        content_type: u.content_type,
        data: u.data,
    });

    if let Ok(Some(input)) = surface.accept(files) {
        assert!(pulmo::upload::is_image_type(input.content_type()));
        assert!(input.len() <= 4096);
    }
});
