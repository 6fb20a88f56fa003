use crate::records::Record;
use std::collections::HashMap;
use std::marker::PhantomData;

/// Maps record ids to their position in the list the index was built from.
///
/// Duplicate ids resolve to the last record carrying them.
#[derive(Debug, Clone)]
pub struct Index<T> {
    positions: HashMap<u32, usize>,
    kind: PhantomData<fn() -> T>,
}

impl<T: Record> Index<T> {
    pub fn build(records: &[T]) -> Self {
        let mut index = Index {
            positions: HashMap::with_capacity(records.len()),
            kind: PhantomData,
        };
        records
            .iter()
            .enumerate()
            .for_each(|(position, record)| index.insert(record.id(), position));
        index
    }

    pub fn insert(&mut self, id: u32, position: usize) {
        self.positions.insert(id, position);
    }

    /// Resolves `id` against the same list the index was built from.
    pub fn get<'a>(&self, records: &'a [T], id: u32) -> Option<&'a T> {
        self.positions
            .get(&id)
            .and_then(|&position| records.get(position))
    }
}

#[cfg(test)]
use crate::loader::read_records;
#[cfg(test)]
use crate::records::Event;

#[test]
fn last_duplicate_wins() {
    let data = "1;First;Music;2024-06-01;50\n2;Other;Sport;2024-06-01;5\n1;Second;Music;2024-06-02;10\n";
    let events: Vec<Event> = read_records(data.as_bytes());
    let index = Index::build(&events);

    assert_eq!(index.get(&events, 1).map(|e| e.name.as_str()), Some("Second"));
    assert_eq!(index.get(&events, 2).map(|e| e.name.as_str()), Some("Other"));
    assert!(index.get(&events, 3).is_none());
}
