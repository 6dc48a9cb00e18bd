use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use backprop_net::{Network, SgdConfig, Shuffle, TrainingExample};

struct CountingAlloc {
    allocs: AtomicUsize,
    reallocs: AtomicUsize,
    deallocs: AtomicUsize,
}

impl CountingAlloc {
    const fn new() -> Self {
        Self {
            allocs: AtomicUsize::new(0),
            reallocs: AtomicUsize::new(0),
            deallocs: AtomicUsize::new(0),
        }
    }

    fn reset(&self) {
        self.allocs.store(0, Ordering::Relaxed);
        self.reallocs.store(0, Ordering::Relaxed);
        self.deallocs.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> AllocSnapshot {
        AllocSnapshot {
            allocs: self.allocs.load(Ordering::Relaxed),
            reallocs: self.reallocs.load(Ordering::Relaxed),
            deallocs: self.deallocs.load(Ordering::Relaxed),
        }
    }

    fn alloc_events(&self) -> usize {
        self.allocs.load(Ordering::Relaxed) + self.reallocs.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AllocSnapshot {
    allocs: usize,
    reallocs: usize,
    deallocs: usize,
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.deallocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        self.reallocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc::new();

fn make_examples(len: usize, input_dim: usize, output_dim: usize) -> Vec<TrainingExample> {
    (0..len)
        .map(|i| {
            let x = vec![0.1 * (i % 7) as f64; input_dim];
            let mut y = vec![0.0; output_dim];
            y[i % output_dim] = 1.0;
            TrainingExample::new(x, y)
        })
        .collect()
}

#[test]
fn train_does_not_allocate_per_mini_batch() {
    let input_dim = 32;
    let hidden = 24;
    let output_dim = 8;
    let mini_batch_size = 16;

    let base = Network::new_with_seed(&[input_dim, hidden, output_dim], 0).unwrap();

    let train_small = make_examples(mini_batch_size, input_dim, output_dim);
    let train_large = make_examples(mini_batch_size * 64, input_dim, output_dim);

    let cfg = SgdConfig {
        epochs: 1,
        mini_batch_size,
        learning_rate: 0.5,
        shuffle: Shuffle::Seeded(3),
    };

    // First use registers the logging callsites.
    base.clone().train(&train_small, None, &cfg).unwrap();

    let mut net_small = base.clone();
    ALLOC.reset();
    let before_small = ALLOC.snapshot();
    net_small.train(&train_small, None, &cfg).unwrap();
    let alloc_small = ALLOC.alloc_events();
    let after_small = ALLOC.snapshot();

    let mut net_large = base;
    ALLOC.reset();
    let before_large = ALLOC.snapshot();
    net_large.train(&train_large, None, &cfg).unwrap();
    let alloc_large = ALLOC.alloc_events();
    let after_large = ALLOC.snapshot();

    assert_eq!(
        alloc_small, alloc_large,
        "expected allocation event count to be independent of the number of mini-batches.\n\
small: before={before_small:?} after={after_small:?}\n\
large: before={before_large:?} after={after_large:?}"
    );

    // Driving mini-batches by hand with a reused trainer allocates nothing.
    let batch = &train_small[..10];
    let mut trainer = net_large.trainer();
    net_large.update_mini_batch_with(&mut trainer, batch, 0.1).unwrap();
    ALLOC.reset();
    for _ in 0..20 {
        net_large.update_mini_batch_with(&mut trainer, batch, 0.1).unwrap();
    }
    assert_eq!(ALLOC.alloc_events(), 0, "{:?}", ALLOC.snapshot());
}
