//! Sparse integer positions for a user's ordered task list.
//!
//! Tasks are displayed by descending `position`. New tasks go on top at
//! `max + GAP`; moves land between two anchors without touching any other
//! row. Only when no free integer is left between the anchors is the whole
//! list renumbered with uniform gaps.
//!
//! The planner here is pure: callers load the owner's active positions
//! inside an owner-scoped transaction, ask for a [`MovePlan`], and apply it
//! in the same transaction.

use crate::error::CoreError;
use crate::types::DbId;

/// Spacing between adjacent positions.
pub const GAP: i64 = 1000;

/// An active task and its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: DbId,
    pub position: i64,
}

/// What a move has to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    /// No anchors were given.
    Unchanged,
    /// Only the moved task changes position.
    Place(i64),
    /// Every active task of the owner (moved task included) gets a new
    /// position. `target` is the moved task's new position.
    Renumber { target: i64, positions: Vec<Slot> },
}

/// Position for a newly created task given the owner's current maximum.
///
/// `None` when `max + GAP` overflows; the caller then renumbers with
/// [`regap_for_new`].
pub fn position_for_new(max_position: Option<i64>) -> Option<i64> {
    match max_position {
        Some(max) => max.checked_add(GAP),
        None => Some(0),
    }
}

/// Renumber `existing` with uniform gaps, leaving the top slot for a new
/// task. Returns the new task's position and the others' new positions.
pub fn regap_for_new(existing: &[Slot]) -> (i64, Vec<Slot>) {
    let ordered = sorted_descending(existing);
    let mut values = regap_positions(ordered.len() + 1).into_iter();
    let target = values.next().unwrap_or(0);
    let positions = ordered
        .iter()
        .zip(values)
        .map(|(slot, position)| Slot { id: slot.id, position })
        .collect();
    (target, positions)
}

/// Plan moving `task_id` relative to its visual neighbours.
///
/// `siblings` are the owner's other active tasks, in any order. `above` is
/// the task that should end up directly above (higher position), `below`
/// the one directly below.
pub fn plan_move(
    task_id: DbId,
    siblings: &[Slot],
    above: Option<DbId>,
    below: Option<DbId>,
) -> Result<MovePlan, CoreError> {
    if above.is_none() && below.is_none() {
        return Ok(MovePlan::Unchanged);
    }
    for anchor in [above, below].into_iter().flatten() {
        if anchor == task_id {
            return Err(CoreError::InvalidAnchor { id: anchor });
        }
    }
    if let (Some(a), Some(b)) = (above, below) {
        if a == b {
            return Err(CoreError::InvalidAnchor { id: a });
        }
    }

    let ordered = sorted_descending(siblings);
    let index_of = |id: DbId| {
        ordered
            .iter()
            .position(|s| s.id == id)
            .ok_or(CoreError::InvalidAnchor { id })
    };
    let is_free = |candidate: i64| !ordered.iter().any(|s| s.position == candidate);

    let plan = match (above, below) {
        (Some(a), None) => {
            let ia = index_of(a)?;
            let pa = ordered[ia].position;
            match pa.checked_sub(GAP) {
                Some(candidate) if is_free(candidate) => MovePlan::Place(candidate),
                // The anchor is not the bottom of the list; squeeze in under it.
                _ => fit_between(
                    task_id,
                    &ordered,
                    Some(pa),
                    ordered.get(ia + 1).map(|s| s.position),
                    ia + 1,
                ),
            }
        }
        (None, Some(b)) => {
            let ib = index_of(b)?;
            let pb = ordered[ib].position;
            match pb.checked_add(GAP) {
                Some(candidate) if is_free(candidate) => MovePlan::Place(candidate),
                _ => fit_between(
                    task_id,
                    &ordered,
                    ib.checked_sub(1).map(|i| ordered[i].position),
                    Some(pb),
                    ib,
                ),
            }
        }
        (Some(a), Some(b)) => {
            let ia = index_of(a)?;
            let ib = index_of(b)?;
            let pa = ordered[ia].position;
            let pb = ordered[ib].position;
            let mid = midpoint(pa, pb);
            if mid != pa && mid != pb && is_free(mid) {
                MovePlan::Place(mid)
            } else {
                renumber(task_id, &ordered, ia + 1)
            }
        }
        (None, None) => MovePlan::Unchanged,
    };

    Ok(plan)
}

/// Floor of the mean, without overflow.
pub fn midpoint(a: i64, b: i64) -> i64 {
    // The mean of two i64 values always fits back into an i64.
    (i128::from(a) + i128::from(b)).div_euclid(2) as i64
}

/// Uniformly spaced positions for `count` tasks, top first, bottom at zero.
pub fn regap_positions(count: usize) -> Vec<i64> {
    (0..count).rev().map(|i| i as i64 * GAP).collect()
}

fn sorted_descending(slots: &[Slot]) -> Vec<Slot> {
    let mut ordered = slots.to_vec();
    ordered.sort_by(|a, b| b.position.cmp(&a.position).then(a.id.cmp(&b.id)));
    ordered
}

/// Place between two optional bounds, renumbering when there is no room.
fn fit_between(
    task_id: DbId,
    ordered: &[Slot],
    upper: Option<i64>,
    lower: Option<i64>,
    insert_at: usize,
) -> MovePlan {
    let candidate = match (upper, lower) {
        (Some(u), Some(l)) => Some(midpoint(u, l)).filter(|m| *m != u && *m != l),
        (Some(u), None) => u.checked_sub(GAP),
        (None, Some(l)) => l.checked_add(GAP),
        (None, None) => Some(0),
    };
    match candidate {
        Some(c) if !ordered.iter().any(|s| s.position == c) => MovePlan::Place(c),
        _ => renumber(task_id, ordered, insert_at),
    }
}

fn renumber(task_id: DbId, ordered: &[Slot], insert_at: usize) -> MovePlan {
    let mut ids: Vec<DbId> = ordered.iter().map(|s| s.id).collect();
    let insert_at = insert_at.min(ids.len());
    ids.insert(insert_at, task_id);

    let positions: Vec<Slot> = ids
        .into_iter()
        .zip(regap_positions(ordered.len() + 1))
        .map(|(id, position)| Slot { id, position })
        .collect();
    let target = positions[insert_at].position;

    MovePlan::Renumber { target, positions }
}
