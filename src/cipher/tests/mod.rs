// Copyright (C) Microsoft Corporation. All rights reserved.

mod cbc_tests;

use super::*;

fn attrs() -> KeyAttributes {
    KeyAttributes::new(KeyUsage::encrypt_decrypt())
}

/// Transform double that fails every request with a fixed error.
struct FailingTransform(TransformError);

impl BlockTransform for FailingTransform {
    fn transform(
        &self,
        _req: &TransformRequest<'_>,
        _output: &mut [u8],
    ) -> Result<(), TransformError> {
        Err(self.0)
    }
}
