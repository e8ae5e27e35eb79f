// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text frame format read from stdin.
//
// One line per video frame. Each symbol is `SYMBOLOGY:payload`; several
// symbols are separated by `;`. A blank line is a frame with no codes.

use whir_core::error::{Result, WhirError};
use whir_core::types::{DecodedSymbol, Symbology};

pub fn parse_frame(line: &str) -> Result<Vec<DecodedSymbol>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    line.split(';').map(parse_symbol).collect()
}

fn parse_symbol(part: &str) -> Result<DecodedSymbol> {
    let (name, payload) = part
        .trim()
        .split_once(':')
        .ok_or_else(|| WhirError::Config(format!("expected SYMBOLOGY:payload, got {part:?}")))?;
    let symbology = Symbology::from_name(name.trim())
        .ok_or_else(|| WhirError::Config(format!("unknown symbology {name:?}")))?;
    Ok(DecodedSymbol::new(symbology, payload.trim()))
}
