// Quick demonstration of the transactional undo engine
// Run with: cargo run --bin demo_undo

use molviz_undo::{Transactable, TransactableSequence, UndoContext};

/// Minimal stand-in for the editor's atom records
#[derive(Debug, Clone, PartialEq)]
struct Atom {
    element: String,
    position: [f32; 3],
}

impl Atom {
    fn new(element: &str, position: [f32; 3]) -> Self {
        Self {
            element: element.to_string(),
            position,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("MolViz undo engine demo");
    println!("=======================");

    let ctx = UndoContext::new();
    let name = Transactable::new(&ctx, "untitled".to_string());
    let atoms: TransactableSequence<Atom> = TransactableSequence::new(&ctx);

    atoms.subscribe(|change| println!("   [atoms changed] {change:?}"));

    // Build a water molecule in one transaction
    let tx = ctx.begin("create water");
    name.set("water".to_string());
    atoms.add_range([
        Atom::new("O", [0.0, 0.0, 0.0]),
        Atom::new("H", [0.96, 0.0, 0.0]),
        Atom::new("H", [-0.24, 0.93, 0.0]),
    ]);
    tx.commit()?;

    println!("\nAfter commit: {} with {} atoms", name.get(), atoms.len());
    println!("   undo menu label: {:?}", ctx.undo_description());

    // A nested edit: replace an atom inside a larger unit of work
    let outer = ctx.begin("deuterate");
    let inner = ctx.begin("swap hydrogen");
    let previous = atoms.set_at(1, Atom::new("D", [0.96, 0.0, 0.0]));
    println!("\nReplaced {previous:?}");
    inner.commit()?;
    outer.commit()?;

    println!("\nUndo steps available: {}", ctx.undo_count());

    ctx.undo()?;
    println!("After undo: atom 1 = {:?}", atoms.get(1));

    ctx.undo()?;
    println!("After second undo: {} atoms, name {:?}", atoms.len(), name.get());

    ctx.redo()?;
    ctx.redo()?;
    println!("\nAfter redo x2: {} with {} atoms", name.get(), atoms.len());

    // Abandoned edits roll back on drop
    {
        let _tx = ctx.begin("abandoned edit");
        atoms.clear();
        println!("\nInside abandoned transaction: {} atoms", atoms.len());
    }
    println!("After drop: {} atoms", atoms.len());

    Ok(())
}
