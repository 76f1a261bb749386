//! Candidate facility computation and pagination.
//!
//! Resolves the answer page and the carry-over set for one turn. All
//! ordering comes from the relation table (semantic branches) or the
//! carried-over id list (follow-up branch); nothing here re-ranks.

use storage::{
    Building, CatalogRepository, Checkpoint, Facility, IntentType, SemanticKeyword, StorageError,
    TurnLogRepository,
};

/// First-answer page size for the recommend/space-request branch.
pub const RECOMMEND_PAGE_SIZE: usize = 3;
/// Page size for each follow-up continuation.
pub const FOLLOWUP_PAGE_SIZE: usize = 2;

/// Result of a fresh (non-follow-up) retrieval: the facilities to answer
/// with now and the ids to carry over for a later follow-up.
#[derive(Debug, Default)]
pub struct Retrieval {
    pub facilities: Vec<Facility>,
    pub remaining: Vec<i64>,
}

/// One follow-up page: the next facilities plus the updated cursor state.
#[derive(Debug)]
pub struct FollowupPage {
    pub facilities: Vec<Facility>,
    pub answered: Vec<i64>,
    pub remaining: Vec<i64>,
}

/// Takes the next page from a prior checkpoint's remaining set, in
/// stable prefix order. Returns None when nothing is left to show; the
/// caller turns that into the terminal "no more results" reply.
pub async fn followup_page(
    catalog: &CatalogRepository,
    prior: &Checkpoint,
) -> Result<Option<FollowupPage>, StorageError> {
    if !prior.has_remaining() {
        return Ok(None);
    }

    let take = prior.remaining.len().min(FOLLOWUP_PAGE_SIZE);
    let consumed: Vec<i64> = prior.remaining[..take].to_vec();
    // Resolve the carried-over ids directly; their list order is the
    // pagination order, never the id order of a fresh query.
    let facilities = catalog.facilities_by_ids(&consumed).await?;

    let mut answered = prior.answered.clone();
    answered.extend(&consumed);
    let remaining: Vec<i64> = prior.remaining[take..].to_vec();

    Ok(Some(FollowupPage {
        facilities,
        answered,
        remaining,
    }))
}

/// Fresh retrieval per the branch order: semantic with a recommendation
/// intent paginates (first page + carry-over); semantic with any other
/// intent excludes what the previous answer already showed; a building
/// alone lists its facilities; otherwise nothing.
pub async fn retrieve(
    catalog: &CatalogRepository,
    turn_log: &TurnLogRepository,
    user_uid: &str,
    session_number: i64,
    semantic: Option<&SemanticKeyword>,
    building: Option<&Building>,
    intent: Option<&IntentType>,
) -> Result<Retrieval, StorageError> {
    if let Some(semantic) = semantic {
        let all = catalog.facilities_by_keyword(&semantic.keyword).await?;

        if intent.map(IntentType::wants_recommendation).unwrap_or(false) {
            if all.len() <= RECOMMEND_PAGE_SIZE {
                return Ok(Retrieval {
                    facilities: all,
                    remaining: Vec::new(),
                });
            }
            let remaining = all[RECOMMEND_PAGE_SIZE..].iter().map(|f| f.id).collect();
            return Ok(Retrieval {
                facilities: all.into_iter().take(RECOMMEND_PAGE_SIZE).collect(),
                remaining,
            });
        }

        // Other intents: exclude what the immediately-previous answer
        // showed; no carry-over is tracked on this path.
        let answered = match turn_log.last_assistant_turn(user_uid, session_number).await? {
            Some(turn) => turn.checkpoint()?.answered,
            None => Vec::new(),
        };
        let facilities = all
            .into_iter()
            .filter(|f| !answered.contains(&f.id))
            .collect();
        return Ok(Retrieval {
            facilities,
            remaining: Vec::new(),
        });
    }

    if let Some(building) = building {
        return Ok(Retrieval {
            facilities: catalog.facilities_by_building(building.id).await?,
            remaining: Vec::new(),
        });
    }

    Ok(Retrieval::default())
}

/// Keeps only facilities whose description carries the floor token.
/// Narrowing only: no token means no filtering.
pub fn filter_by_floor(facilities: Vec<Facility>, floor_token: Option<&str>) -> Vec<Facility> {
    match floor_token {
        Some(token) => facilities
            .into_iter()
            .filter(|f| f.description.contains(token))
            .collect(),
        None => facilities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::Checkpoint;

    async fn repos() -> (CatalogRepository, TurnLogRepository, tempfile::NamedTempFile) {
        let db_file = tempfile::NamedTempFile::new().expect("Failed to create temp db");
        let url = db_file.path().to_str().unwrap();
        let catalog = CatalogRepository::new(url).await.expect("catalog");
        let turn_log = TurnLogRepository::new(url).await.expect("turn log");
        (catalog, turn_log, db_file)
    }

    async fn seed_study_facilities(catalog: &CatalogRepository, count: usize) -> Vec<i64> {
        let b = catalog.insert_building("학생회관", "S관", "").await.unwrap();
        let mut ids = Vec::new();
        for i in 0..count {
            let f = catalog
                .insert_facility(b, &format!("스터디룸{}", i), "학습", "2층")
                .await
                .unwrap();
            catalog.insert_relation("공부", f).await.unwrap();
            ids.push(f);
        }
        ids
    }

    fn semantic(keyword: &str) -> SemanticKeyword {
        SemanticKeyword {
            id: 1,
            keyword: keyword.to_string(),
            alias: String::new(),
            category: String::new(),
        }
    }

    #[tokio::test]
    async fn recommend_branch_splits_three_plus_rest_in_relation_order() {
        let (catalog, turn_log, _db) = repos().await;
        let ids = seed_study_facilities(&catalog, 5).await;

        let sem = semantic("공부");
        let intent = IntentType::RecommendRequest;
        let result = retrieve(&catalog, &turn_log, "u1", 0, Some(&sem), None, Some(&intent))
            .await
            .unwrap();

        assert_eq!(
            result.facilities.iter().map(|f| f.id).collect::<Vec<_>>(),
            &ids[..3]
        );
        assert_eq!(result.remaining, &ids[3..]);
    }

    #[tokio::test]
    async fn recommend_branch_answers_all_when_three_or_fewer() {
        let (catalog, turn_log, _db) = repos().await;
        let ids = seed_study_facilities(&catalog, 2).await;

        let sem = semantic("공부");
        let intent = IntentType::SpaceRequest;
        let result = retrieve(&catalog, &turn_log, "u1", 0, Some(&sem), None, Some(&intent))
            .await
            .unwrap();

        assert_eq!(result.facilities.len(), 2);
        assert_eq!(
            result.facilities.iter().map(|f| f.id).collect::<Vec<_>>(),
            ids
        );
        assert!(result.remaining.is_empty());
    }

    #[tokio::test]
    async fn other_intent_excludes_previously_answered() {
        let (catalog, turn_log, _db) = repos().await;
        let ids = seed_study_facilities(&catalog, 4).await;

        // Previous assistant turn already showed the first two.
        let checkpoint = Checkpoint {
            semantic_keyword: "공부".to_string(),
            answered: ids[..2].to_vec(),
            remaining: Vec::new(),
            matched_building_id: None,
            floor_token: String::new(),
        };
        let turn = storage::TurnRecord::assistant(
            "u1", "A00001".to_string(), "s_000", 0, 0, "이전 답", "s", &checkpoint,
        )
        .unwrap();
        turn_log.append(&turn).await.unwrap();

        let sem = semantic("공부");
        let intent = IntentType::LocateRequest;
        let result = retrieve(&catalog, &turn_log, "u1", 0, Some(&sem), None, Some(&intent))
            .await
            .unwrap();

        assert_eq!(
            result.facilities.iter().map(|f| f.id).collect::<Vec<_>>(),
            &ids[2..]
        );
        assert!(result.remaining.is_empty());
    }

    #[tokio::test]
    async fn building_only_branch_lists_building_facilities() {
        let (catalog, turn_log, _db) = repos().await;
        let b1 = catalog.insert_building("공학관", "G관", "").await.unwrap();
        let b2 = catalog.insert_building("도서관", "L관", "").await.unwrap();
        let f1 = catalog.insert_facility(b1, "실습실", "학습", "").await.unwrap();
        catalog.insert_facility(b2, "열람실", "학습", "").await.unwrap();

        let building = catalog.building_by_id(b1).await.unwrap().unwrap();
        let result = retrieve(&catalog, &turn_log, "u1", 0, None, Some(&building), None)
            .await
            .unwrap();
        assert_eq!(
            result.facilities.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![f1]
        );

        let nothing = retrieve(&catalog, &turn_log, "u1", 0, None, None, None)
            .await
            .unwrap();
        assert!(nothing.facilities.is_empty());
    }

    #[tokio::test]
    async fn followup_pages_stay_disjoint_until_exhausted() {
        let (catalog, _turn_log, _db) = repos().await;
        let ids = seed_study_facilities(&catalog, 5).await;

        let mut checkpoint = Checkpoint {
            semantic_keyword: "공부".to_string(),
            answered: ids[..3].to_vec(),
            remaining: ids[3..].to_vec(),
            matched_building_id: None,
            floor_token: String::new(),
        };

        let page = followup_page(&catalog, &checkpoint).await.unwrap().unwrap();
        assert_eq!(
            page.facilities.iter().map(|f| f.id).collect::<Vec<_>>(),
            &ids[3..5]
        );
        assert!(page.answered.iter().all(|id| !page.remaining.contains(id)));
        assert!(page.remaining.is_empty());

        checkpoint.answered = page.answered;
        checkpoint.remaining = page.remaining;
        assert!(followup_page(&catalog, &checkpoint).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn floor_filter_is_narrowing_only() {
        let facilities = vec![
            Facility {
                id: 1,
                building_id: 1,
                name: "열람실".to_string(),
                category: "학습".to_string(),
                description: "3층 열람실".to_string(),
            },
            Facility {
                id: 2,
                building_id: 1,
                name: "카페".to_string(),
                category: "휴게".to_string(),
                description: "B1층 카페".to_string(),
            },
        ];

        let unfiltered = filter_by_floor(facilities.clone(), None);
        assert_eq!(unfiltered.len(), 2);

        let third = filter_by_floor(facilities.clone(), Some("3층"));
        assert_eq!(third.iter().map(|f| f.id).collect::<Vec<_>>(), vec![1]);

        let none = filter_by_floor(facilities, Some("5층"));
        assert!(none.is_empty());
    }
}
