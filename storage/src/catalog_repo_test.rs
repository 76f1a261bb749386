//! Unit tests for CatalogRepository.
//!
//! Covers table-order listings, relation-order facility retrieval, and
//! id-order-preserving resolution.

use crate::catalog_repo::CatalogRepository;

async fn test_repo() -> (CatalogRepository, tempfile::NamedTempFile) {
    let db_file = tempfile::NamedTempFile::new().expect("Failed to create temp db");
    let repo = CatalogRepository::new(db_file.path().to_str().unwrap())
        .await
        .expect("Failed to create repository");
    (repo, db_file)
}

#[tokio::test]
async fn buildings_listed_in_insertion_order() {
    let (repo, _db) = test_repo().await;

    repo.insert_building("제1공학관", "G관, 공학관", "강의실과 실습실. 1층, 2층, 3층")
        .await
        .unwrap();
    repo.insert_building("학생회관", "S관", "학생 식당. B1층, 1층")
        .await
        .unwrap();

    let buildings = repo.buildings().await.unwrap();
    assert_eq!(buildings.len(), 2);
    assert_eq!(buildings[0].name, "제1공학관");
    assert_eq!(buildings[1].name, "학생회관");
    assert_eq!(buildings[0].aliases(), vec!["G관", "공학관"]);

    let by_id = repo.building_by_id(buildings[1].id).await.unwrap();
    assert_eq!(by_id.unwrap().name, "학생회관");
    assert!(repo.building_by_id(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn facilities_by_keyword_follow_relation_order() {
    let (repo, _db) = test_repo().await;

    let b = repo.insert_building("학생회관", "S관", "").await.unwrap();
    let f1 = repo.insert_facility(b, "스터디룸", "학습", "2층").await.unwrap();
    let f2 = repo.insert_facility(b, "열람실", "학습", "3층").await.unwrap();
    let f3 = repo.insert_facility(b, "카페", "휴게", "1층").await.unwrap();

    // Relation order deliberately differs from facility id order.
    repo.insert_relation("공부", f2).await.unwrap();
    repo.insert_relation("공부", f1).await.unwrap();
    repo.insert_relation("휴식", f3).await.unwrap();

    let related = repo.facilities_by_keyword("공부").await.unwrap();
    assert_eq!(
        related.iter().map(|f| f.id).collect::<Vec<_>>(),
        vec![f2, f1]
    );

    assert!(repo.facilities_by_keyword("없는키워드").await.unwrap().is_empty());
}

#[tokio::test]
async fn facilities_by_ids_preserve_input_order_and_drop_missing() {
    let (repo, _db) = test_repo().await;

    let b = repo.insert_building("도서관", "L관", "").await.unwrap();
    let f1 = repo.insert_facility(b, "열람실", "학습", "").await.unwrap();
    let f2 = repo.insert_facility(b, "멀티미디어실", "학습", "").await.unwrap();

    let resolved = repo.facilities_by_ids(&[f2, 9999, f1]).await.unwrap();
    assert_eq!(
        resolved.iter().map(|f| f.id).collect::<Vec<_>>(),
        vec![f2, f1]
    );
}

#[tokio::test]
async fn semantic_lookup_by_keyword() {
    let (repo, _db) = test_repo().await;

    repo.insert_semantic_keyword("공부", "시험, 과제, 레포트", "학업")
        .await
        .unwrap();
    repo.insert_intent_keyword("추천해줘, 어디가 좋아", "추천 요청")
        .await
        .unwrap();

    let semantic = repo.semantic_by_keyword("공부").await.unwrap().unwrap();
    assert_eq!(semantic.aliases(), vec!["시험", "과제", "레포트"]);
    assert!(repo.semantic_by_keyword("휴식").await.unwrap().is_none());

    let intents = repo.intent_keywords().await.unwrap();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].phrases(), vec!["추천해줘", "어디가 좋아"]);
}
