//! Lowering attributed instances to pure ones.
//!
//! The search tree only ever sees pure structures. An attributed instance
//! is lowered by materializing, per attribute domain, a table whose
//! elements are the distinct values in use (sorted by the domain's total
//! order), and turning each attribute arrow into an ordinary arrow onto
//! value ranks. The dual `lift` re-instantiates true values after a
//! relabeling has been applied, so canonical candidates are ranked on real
//! attribute data.
//!
//! The lowering trades precision for uniformity: elements that differ only
//! by attribute value start out indistinguishable, and the search may
//! permute value-table elements freely. Canonicalization undoes this by
//! lifting before ranking; `autos` undoes it by keeping only relabelings
//! that fix every value table pointwise.

use crate::cset::{AttrValue, CSet, CSetError};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// A pure structure lowered from a (possibly attributed) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pseudo {
    cset: CSet,
    values: Vec<Vec<AttrValue>>,
}

impl Pseudo {
    /// Lowers `g`.
    ///
    /// For a pure input the lowering is `g` itself (no synthetic tables,
    /// no value lists).
    pub fn new(g: &CSet) -> Result<Self, CSetError> {
        let schema = g.schema();
        if schema.is_pure() {
            return Ok(Self { cset: g.clone(), values: Vec::new() });
        }

        // Distinct used values per domain, sorted by the domain order.
        let mut values: Vec<Vec<AttrValue>> = vec![Vec::new(); schema.dom_count()];
        for (x, attr) in schema.attrs().iter().enumerate() {
            let pool = &mut values[attr.dom.index()];
            for v in g.attr_values(crate::schema::AttrId(x)) {
                pool.push(v.clone());
            }
        }
        for pool in &mut values {
            pool.sort();
            pool.dedup();
        }

        // Same tables and arrows, plus one table per domain; each attribute
        // arrow becomes an ordinary arrow into its domain's table.
        let mut tables: Vec<String> = schema.tables().to_vec();
        tables.extend(schema.doms().iter().cloned());
        let mut arrows: Vec<(String, usize, usize)> = schema
            .arrows()
            .iter()
            .map(|a| (a.name.clone(), a.src.index(), a.tgt.index()))
            .collect();
        for attr in schema.attrs() {
            arrows.push((
                attr.name.clone(),
                attr.src.index(),
                schema.table_count() + attr.dom.index(),
            ));
        }
        let lowered = Schema::new(tables, arrows, Vec::new(), Vec::new())
            .expect("names were unique in the validated source schema");

        let mut sizes = g.sizes().to_vec();
        sizes.extend(values.iter().map(|pool| pool.len()));

        let mut images: Vec<Vec<usize>> = g.images().to_vec();
        for (x, attr) in schema.attrs().iter().enumerate() {
            let pool = &values[attr.dom.index()];
            let ranks = g
                .attr_values(crate::schema::AttrId(x))
                .iter()
                .map(|v| {
                    pool.binary_search(v)
                        .expect("every used value was pooled")
                })
                .collect();
            images.push(ranks);
        }

        let cset = CSet::new(lowered, sizes, images, Vec::new())?;
        Ok(Self { cset, values })
    }

    /// The lowered pure structure.
    #[inline]
    pub fn cset(&self) -> &CSet {
        &self.cset
    }

    /// Distinct sorted values per domain.
    #[inline]
    pub fn values(&self) -> &[Vec<AttrValue>] {
        &self.values
    }

    /// Reverses the lowering for a relabeled copy `p` of the lowered
    /// structure.
    ///
    /// Deep-copies `orig`, overlays every ordinary arrow image from `p`,
    /// and maps each converted attribute arrow's rank column back through
    /// the sorted value lists.
    pub fn lift(&self, p: &CSet, orig: &CSet) -> Result<CSet, CSetError> {
        let schema = orig.schema();
        if schema.is_pure() {
            return Ok(p.clone());
        }
        let images: Vec<Vec<usize>> = p.images()[..schema.arrow_count()].to_vec();
        let mut attrs = Vec::with_capacity(schema.attr_count());
        for (x, attr) in schema.attrs().iter().enumerate() {
            let pool = &self.values[attr.dom.index()];
            let ranks = &p.images()[schema.arrow_count() + x];
            attrs.push(ranks.iter().map(|&r| pool[r].clone()).collect());
        }
        CSet::new(schema.clone(), orig.sizes().to_vec(), images, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ArrowId, AttrId, Schema, TableId};

    fn labeled_cycle(dec: [&str; 4]) -> CSet {
        let schema = Schema::new(
            vec!["V".into(), "E".into()],
            vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
            vec!["Label".into()],
            vec![("dec".into(), 0, 0)],
        )
        .unwrap();
        CSet::new(
            schema,
            vec![4, 4],
            vec![vec![0, 1, 2, 3], vec![1, 2, 3, 0]],
            vec![dec.iter().map(|&s| s.into()).collect()],
        )
        .unwrap()
    }

    #[test]
    fn lowering_adds_one_table_per_domain() {
        let g = labeled_cycle(["a", "b", "c", "d"]);
        let p = Pseudo::new(&g).unwrap();
        let lowered = p.cset();
        assert_eq!(lowered.schema().table_count(), 3);
        assert_eq!(lowered.schema().arrow_count(), 3);
        assert!(lowered.schema().is_pure());
        assert_eq!(lowered.size(TableId(2)), 4);
        // Sorted ranks: "a" < "b" < "c" < "d".
        assert_eq!(lowered.image(ArrowId(2)), &[0, 1, 2, 3]);
    }

    #[test]
    fn repeated_values_pool_once() {
        let g = labeled_cycle(["b", "a", "b", "a"]);
        let p = Pseudo::new(&g).unwrap();
        assert_eq!(p.values()[0].len(), 2);
        assert_eq!(p.cset().image(ArrowId(2)), &[1, 0, 1, 0]);
    }

    #[test]
    fn lift_round_trips_identity() {
        let g = labeled_cycle(["a", "b", "c", "d"]);
        let p = Pseudo::new(&g).unwrap();
        let lifted = p.lift(p.cset(), &g).unwrap();
        assert_eq!(lifted, g);
    }

    #[test]
    fn lift_tracks_value_table_relabeling() {
        use crate::perm::CMap;
        let g = labeled_cycle(["a", "b", "c", "d"]);
        let p = Pseudo::new(&g).unwrap();
        // Swap the first two value-table elements; fix V and E.
        let swap = CMap::new(vec![
            (0..4).collect(),
            (0..4).collect(),
            vec![1, 0, 2, 3],
        ]);
        let relabeled = p.cset().apply(&swap).unwrap();
        let lifted = p.lift(&relabeled, &g).unwrap();
        assert_eq!(
            lifted.attr_values(AttrId(0)),
            &[
                AttrValue::from("b"),
                AttrValue::from("a"),
                AttrValue::from("c"),
                AttrValue::from("d"),
            ]
        );
    }

    #[test]
    fn pure_input_lowers_to_itself() {
        let schema = Schema::new(
            vec!["V".into()],
            vec![("next".into(), 0, 0)],
            vec![],
            vec![],
        )
        .unwrap();
        let g = CSet::new(schema, vec![3], vec![vec![1, 2, 0]], vec![]).unwrap();
        let p = Pseudo::new(&g).unwrap();
        assert_eq!(p.cset(), &g);
        assert!(p.values().is_empty());
    }
}
