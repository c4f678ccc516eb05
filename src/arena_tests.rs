use super::Arena;

#[test]
fn alloc_str_copies() {
    let arena = Arena::new();
    let source = String::from("hello");
    let copy = arena.alloc_str(&source);
    assert_eq!(copy, "hello");
    assert_ne!(copy.as_ptr(), source.as_ptr());
}

#[test]
fn alloc_str_empty() {
    let arena = Arena::new();
    assert_eq!(arena.alloc_str(""), "");
}

#[test]
fn earlier_allocations_survive_growth() {
    let arena = Arena::new();
    let mut slices = Vec::new();
    for i in 0..200 {
        let text = format!("value-{i}-{}", "x".repeat(i));
        slices.push((arena.alloc_str(&text), text));
    }
    // Growing into new slabs must not invalidate earlier slices.
    for (slice, expected) in &slices {
        assert_eq!(slice, expected);
    }
}

#[test]
fn alloc_larger_than_a_slab() {
    let arena = Arena::new();
    let big = "y".repeat(1 << 16);
    assert_eq!(arena.alloc_str(&big), big);
    // And the arena keeps working afterwards.
    assert_eq!(arena.alloc_str("tail"), "tail");
}

#[test]
fn scratch_commit_advances_the_bump_pointer() {
    let arena = Arena::new();
    // Safety: one scratch at a time.
    let mut scratch = unsafe { arena.scratch() };
    scratch.push(b'a');
    scratch.extend(b"bc");
    assert_eq!(scratch.as_bytes(), b"abc");
    assert_eq!(scratch.len(), 3);
    let committed = scratch.commit();
    assert_eq!(committed, b"abc");

    // A follow-up allocation must not overlap the committed bytes.
    let next = arena.alloc_str("next");
    assert_eq!(committed, b"abc");
    assert_eq!(next, "next");
}

#[test]
fn uncommitted_scratch_is_reused() {
    let arena = Arena::new();
    let first = arena.alloc_str("seed");
    {
        // Safety: one scratch at a time; dropped without commit.
        let mut scratch = unsafe { arena.scratch() };
        scratch.extend(b"discarded");
    }
    let second = arena.alloc_str("kept");
    // The discarded scratch bytes were overwritten, the committed ones not.
    assert_eq!(first, "seed");
    assert_eq!(second, "kept");
}

#[test]
fn scratch_grows_across_slabs() {
    let arena = Arena::new();
    // Safety: one scratch at a time.
    let mut scratch = unsafe { arena.scratch() };
    let blob: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    for chunk in blob.chunks(7) {
        scratch.extend(chunk);
    }
    assert_eq!(scratch.commit(), &blob[..]);
}
