use trunkline_ir::{BoundaryKey, BoundaryMove, Step};

/// Derive the boundary moves between two adjacent steps.
///
/// Only replicas present in both steps are compared; a replica that appears
/// or disappears contributes no moves. Moves are emitted in the previous
/// step's replica order, then lattice order `T, D, A, C, E`.
pub fn derive_boundary_moves(prev: &Step, curr: &Step) -> Vec<BoundaryMove> {
    let mut moves = Vec::new();

    for (replica_id, prev_state) in &prev.replicas {
        let Some(curr_state) = curr.replicas.get(replica_id) else {
            continue;
        };
        for boundary in BoundaryKey::ALL {
            let from = prev_state.boundary(boundary);
            let to = curr_state.boundary(boundary);
            if from != to {
                moves.push(BoundaryMove::new(replica_id.clone(), boundary, from, to));
            }
        }
    }

    moves
}
