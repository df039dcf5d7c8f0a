//! WASM guest memory helpers: length-prefixed byte transfer between host
//! and guest, adapted from the teacher's Clean-Language string convention
//! (4-byte little-endian length prefix, bump-allocated).

use wasmtime::{Memory, Store};

use crate::error::EvalError;

pub const LENGTH_PREFIX_SIZE: usize = 4;
const GUEST_SCRATCH_OFFSET: usize = 65536;

pub fn write_bundle<T>(
    store: &mut Store<T>,
    memory: &Memory,
    bytes: &[u8],
) -> Result<u32, EvalError> {
    let ptr = GUEST_SCRATCH_OFFSET;
    let total = LENGTH_PREFIX_SIZE + bytes.len();
    ensure_memory_size(store, memory, ptr + total)?;

    let len_bytes = (bytes.len() as u32).to_le_bytes();
    memory
        .write(&mut *store, ptr, &len_bytes)
        .map_err(|e| EvalError::runtime("failed to write bundle length", anyhow::anyhow!(e.to_string())))?;
    memory
        .write(&mut *store, ptr + LENGTH_PREFIX_SIZE, bytes)
        .map_err(|e| EvalError::runtime("failed to write bundle bytes", anyhow::anyhow!(e.to_string())))?;

    Ok(ptr as u32)
}

pub fn read_bundle<T>(store: &Store<T>, memory: &Memory, ptr: u32) -> Result<Vec<u8>, EvalError> {
    let data = memory.data(store);
    let ptr = ptr as usize;

    if ptr + LENGTH_PREFIX_SIZE > data.len() {
        return Err(EvalError::runtime_simple(format!(
            "output pointer {ptr} out of bounds (memory size {})",
            data.len()
        )));
    }
    let len_bytes: [u8; 4] = data[ptr..ptr + LENGTH_PREFIX_SIZE]
        .try_into()
        .expect("slice of length 4");
    let len = u32::from_le_bytes(len_bytes) as usize;

    let start = ptr + LENGTH_PREFIX_SIZE;
    let end = start + len;
    if end > data.len() {
        return Err(EvalError::runtime_simple(format!(
            "output data {start}..{end} out of bounds (memory size {})",
            data.len()
        )));
    }

    Ok(data[start..end].to_vec())
}

fn ensure_memory_size<T>(store: &mut Store<T>, memory: &Memory, required: usize) -> Result<(), EvalError> {
    let current = memory.data_size(&*store);
    if required <= current {
        return Ok(());
    }
    let required_pages = ((required + 65535) / 65536) as u64;
    let current_pages = memory.size(&*store);
    let grow_by = required_pages.saturating_sub(current_pages);
    if grow_by > 0 {
        memory
            .grow(&mut *store, grow_by)
            .map_err(|e| EvalError::runtime("failed to grow guest memory", anyhow::anyhow!(e.to_string())))?;
    }
    Ok(())
}
