use thiserror::Error;

/// Identifier of a halo within one snapshot.
pub type HaloId = u64;

/// Link to a neighbouring halo in the adjacent snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Halo identifier in the neighbouring snapshot.
    pub id: HaloId,
    /// Particle count of the linked halo.
    pub particles: u64,
}

impl Link {
    /// Construct a new link.
    pub fn new(id: HaloId, particles: u64) -> Self {
        Self { id, particles }
    }
}

/// Which side of a record a consistency error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    /// Links into the preceding snapshot.
    Progenitor,
    /// Links into the following snapshot.
    Descendant,
}

impl std::fmt::Display for LinkSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkSide::Progenitor => f.write_str("progenitor"),
            LinkSide::Descendant => f.write_str("descendant"),
        }
    }
}

/// Errors raised when assembling a record from columnar fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Declared link count disagrees with the number of listed ids.
    #[error("declared {side} count {declared} but {listed} ids are listed")]
    CountMismatch {
        /// Side of the record.
        side: LinkSide,
        /// `nProg`/`nDesc` as stored.
        declared: usize,
        /// Length of the id list.
        listed: usize,
    },

    /// Id list and particle list are not parallel.
    #[error("{side} ids ({ids}) and particle counts ({particles}) differ in length")]
    UnpairedMasses {
        /// Side of the record.
        side: LinkSide,
        /// Length of the id list.
        ids: usize,
        /// Length of the particle list.
        particles: usize,
    },
}

/// One halo at one snapshot.
///
/// Link lists are ordered by descending mass, so index 0 is the most
/// massive progenitor or descendant. `n_prog`/`n_desc` are the list lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaloRecord {
    /// Current particle count (mass proxy).
    pub particles: u64,
    progenitors: Vec<Link>,
    descendants: Vec<Link>,
}

impl HaloRecord {
    /// Construct a record from already-paired links.
    pub fn new(particles: u64, progenitors: Vec<Link>, descendants: Vec<Link>) -> Self {
        Self {
            particles,
            progenitors,
            descendants,
        }
    }

    /// Assemble a record from the columnar merger-graph layout, checking
    /// that declared counts and parallel lists agree.
    pub fn from_columns(
        particles: u64,
        n_prog: usize,
        prog_ids: &[HaloId],
        prog_particles: &[u64],
        n_desc: usize,
        desc_ids: &[HaloId],
        desc_particles: &[u64],
    ) -> Result<Self, RecordError> {
        let progenitors = pair_links(LinkSide::Progenitor, n_prog, prog_ids, prog_particles)?;
        let descendants = pair_links(LinkSide::Descendant, n_desc, desc_ids, desc_particles)?;
        Ok(Self::new(particles, progenitors, descendants))
    }

    /// Number of progenitors (`nProg`).
    pub fn n_prog(&self) -> usize {
        self.progenitors.len()
    }

    /// Number of descendants (`nDesc`).
    pub fn n_desc(&self) -> usize {
        self.descendants.len()
    }

    /// Progenitor links, most massive first.
    pub fn progenitors(&self) -> &[Link] {
        &self.progenitors
    }

    /// Descendant links, most massive first.
    pub fn descendants(&self) -> &[Link] {
        &self.descendants
    }

    /// Most massive progenitor, the next step of the main branch.
    pub fn main_progenitor(&self) -> Option<Link> {
        self.progenitors.first().copied()
    }

    /// Most massive descendant.
    pub fn main_descendant(&self) -> Option<Link> {
        self.descendants.first().copied()
    }
}

fn pair_links(
    side: LinkSide,
    declared: usize,
    ids: &[HaloId],
    particles: &[u64],
) -> Result<Vec<Link>, RecordError> {
    if declared != ids.len() {
        return Err(RecordError::CountMismatch {
            side,
            declared,
            listed: ids.len(),
        });
    }
    if ids.len() != particles.len() {
        return Err(RecordError::UnpairedMasses {
            side,
            ids: ids.len(),
            particles: particles.len(),
        });
    }
    Ok(ids
        .iter()
        .zip(particles)
        .map(|(&id, &particles)| Link::new(id, particles))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_columns_pairs_links_in_order() {
        let record =
            HaloRecord::from_columns(500, 2, &[7, 3], &[300, 100], 1, &[11], &[600]).unwrap();
        assert_eq!(record.n_prog(), 2);
        assert_eq!(record.n_desc(), 1);
        assert_eq!(record.main_progenitor(), Some(Link::new(7, 300)));
        assert_eq!(record.main_descendant(), Some(Link::new(11, 600)));
    }

    #[test]
    fn from_columns_rejects_count_mismatch() {
        let err = HaloRecord::from_columns(500, 3, &[7, 3], &[300, 100], 0, &[], &[]).unwrap_err();
        assert_eq!(
            err,
            RecordError::CountMismatch {
                side: LinkSide::Progenitor,
                declared: 3,
                listed: 2
            }
        );
    }

    #[test]
    fn from_columns_rejects_unpaired_masses() {
        let err = HaloRecord::from_columns(500, 0, &[], &[], 1, &[4], &[]).unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnpairedMasses {
                side: LinkSide::Descendant,
                ..
            }
        ));
    }
}
