use crate::error::StoreError;
use crate::record::StudentRecord;
use crate::store::RecordStore;

/// The record list the dashboard works from.
///
/// It only changes after the store has answered: a failed refresh keeps the
/// previous list, and a failed delete keeps the record.
#[derive(Debug, Default)]
pub struct Roster {
    records: Vec<StudentRecord>,
}

impl Roster {
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn refresh<S: RecordStore + ?Sized>(&mut self, store: &S) -> Result<usize, StoreError> {
        match store.list_records() {
            Ok(records) => {
                self.records = records;
                Ok(self.records.len())
            }
            Err(e) => {
                log::error!("error fetching student records: {}", e);
                Err(e)
            }
        }
    }

    pub fn delete<S: RecordStore + ?Sized>(&mut self, store: &S, id: &str) -> Result<(), StoreError> {
        if let Err(e) = store.delete_record(id) {
            log::error!("error deleting record {}: {}", id, e);
            return Err(e);
        }
        self.records.retain(|r| r.id != id);
        Ok(())
    }

    /// Puts a freshly stored record at the front, where a refetch would
    /// place it.
    pub fn push_newest(&mut self, record: StudentRecord) {
        self.records.insert(0, record);
    }
}
