#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
const PARALLEL_THRESHOLD: usize = 1024;

pub fn for_each_indexed_mut<T, F>(slice: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if slice.len() >= PARALLEL_THRESHOLD {
            slice
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, value)| f(idx, value));
            return;
        }
    }

    for (idx, value) in slice.iter_mut().enumerate() {
        f(idx, value);
    }
}

/// Runs `f` over fixed-size chunks of `slice` and collects one result per
/// chunk, in chunk order. The first argument to `f` is the index of the
/// chunk's first element. Chunks never overlap, so `f` may write freely.
pub fn map_chunks_mut<T, R, F>(slice: &mut [T], chunk_size: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut [T]) -> R + Sync + Send,
{
    let chunk_size = chunk_size.max(1);

    #[cfg(not(target_arch = "wasm32"))]
    {
        if slice.len() >= PARALLEL_THRESHOLD {
            return slice
                .par_chunks_mut(chunk_size)
                .enumerate()
                .map(|(idx, chunk)| f(idx * chunk_size, chunk))
                .collect();
        }
    }

    slice
        .chunks_mut(chunk_size)
        .enumerate()
        .map(|(idx, chunk)| f(idx * chunk_size, chunk))
        .collect()
}
