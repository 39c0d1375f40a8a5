use std::sync::Arc;

use railbook_catalog::Train;
use tracing::{debug, info};

use crate::repository::Repository;
use crate::CoreResult;

/// Does `train` run from `source` to `destination` in that order?
///
/// Both stations must be on the route and the source must come strictly before the
/// destination. A missing station is simply "no route".
pub fn find_route(train: &Train, source: &str, destination: &str) -> bool {
    match (train.station_index(source), train.station_index(destination)) {
        (Some(source_index), Some(destination_index)) => source_index < destination_index,
        _ => false,
    }
}

/// The loaded train collection and the repository it is written back to.
pub struct TrainDirectory {
    trains: Vec<Train>,
    repository: Arc<dyn Repository<Train>>,
}

impl TrainDirectory {
    pub async fn load(repository: Arc<dyn Repository<Train>>) -> CoreResult<Self> {
        let trains = repository.load_all().await?;
        info!("Loaded {} trains", trains.len());
        Ok(Self { trains, repository })
    }

    #[cfg(test)]
    pub(crate) fn trains(&self) -> &[Train] {
        &self.trains
    }

    /// Trains serving `source` → `destination`, in collection order.
    pub fn search(&self, source: &str, destination: &str) -> Vec<&Train> {
        let matches: Vec<&Train> = self
            .trains
            .iter()
            .filter(|train| find_route(train, source, destination))
            .collect();
        debug!(
            "Route search {} -> {} matched {} of {} trains",
            source,
            destination,
            matches.len(),
            self.trains.len()
        );
        matches
    }

    pub fn get(&self, train_id: &str) -> Option<&Train> {
        self.trains.iter().find(|train| train.has_id(train_id))
    }

    pub fn get_mut(&mut self, train_id: &str) -> Option<&mut Train> {
        self.trains.iter_mut().find(|train| train.has_id(train_id))
    }

    /// Replaces the train with the same identifier in place, or appends it, then persists.
    pub async fn upsert(&mut self, train: Train) -> CoreResult<()> {
        match self.trains.iter().position(|existing| existing.has_id(&train.train_id)) {
            Some(index) => self.trains[index] = train,
            None => self.trains.push(train),
        }
        self.persist().await
    }

    pub async fn persist(&self) -> CoreResult<()> {
        self.repository.save_all(&self.trains).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use railbook_catalog::SeatGrid;

    fn train(id: &str, stations: &[&str]) -> Train {
        stations
            .iter()
            .fold(Train::new(id, format!("{}-no", id)), |train, station| {
                train.with_station(station, "00:00")
            })
    }

    #[test]
    fn test_route_ordering() {
        let train = train("T1", &["A", "B", "C", "D"]);

        assert!(find_route(&train, "a", "c"));
        assert!(!find_route(&train, "c", "a"));
        assert!(!find_route(&train, "a", "a"));
        assert!(!find_route(&train, "x", "c"));
        assert!(!find_route(&train, "a", "x"));
    }

    #[test]
    fn test_route_uses_first_occurrence() {
        // Loop line: "b" appears twice, the first index decides
        let mut train = train("L1", &["a", "b", "c"]);
        train.stations.push("b".to_string());

        assert!(find_route(&train, "a", "b"));
        assert!(!find_route(&train, "c", "b"));
    }

    #[tokio::test]
    async fn test_search_filters_collection_in_order() {
        let repo = Arc::new(InMemoryRepository::with_records(vec![
            train("T1", &["a", "b", "c"]),
            train("T2", &["c", "b", "a"]),
            train("T3", &["x", "a", "y", "c"]),
        ]));
        let directory = TrainDirectory::load(repo).await.unwrap();

        let ids: Vec<&str> = directory
            .search("a", "c")
            .iter()
            .map(|train| train.train_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T1", "T3"]);
        assert!(directory.search("q", "c").is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id_in_place() {
        let repo = Arc::new(InMemoryRepository::with_records(vec![
            train("T1", &["a", "b"]),
            train("T2", &["b", "c"]),
            train("T3", &["c", "d"]),
        ]));
        let mut directory = TrainDirectory::load(repo.clone()).await.unwrap();

        let replacement = train("t2", &["b", "c"]).with_seats(SeatGrid::with_dimensions(1, 4));
        directory.upsert(replacement.clone()).await.unwrap();

        assert_eq!(directory.trains().len(), 3);
        assert_eq!(directory.trains()[1], replacement);
        assert_eq!(repo.snapshot(), directory.trains().to_vec());
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_upsert_appends_unknown_train() {
        let repo = Arc::new(InMemoryRepository::<Train>::new());
        let mut directory = TrainDirectory::load(repo.clone()).await.unwrap();

        directory.upsert(train("T9", &["a", "b"])).await.unwrap();
        assert_eq!(directory.trains().len(), 1);
        assert!(directory.get("t9").is_some());
        assert_eq!(repo.snapshot().len(), 1);
    }
}
