#![allow(dead_code)]

use portal_archive::cache::CacheLayer;
use portal_archive::config::EngineConfig;
use portal_archive::model::{Document, Resource};
use portal_archive::sync::MemoryCollection;
use portal_archive::types::{DOCUMENTS_COLLECTION, RESOURCES_COLLECTION};
use portal_archive::ArchiveEngine;

/// Two categories; "dersler" holds a year folder with a nested exam folder and files
pub fn archive_documents() -> Vec<Document> {
    vec![
        Document::root("komiteler", "Komiteler").with_created_at(2),
        Document::root("dersler", "Dersler").with_created_at(1),
        Document::file("syllabus", "Syllabus.pdf", "dersler", "https://files/syllabus.pdf")
            .with_created_at(3),
        Document::folder("y2023", "2023", "dersler").with_created_at(4),
        Document::file("notes", "Notlar.pdf", "y2023", "https://files/notes.pdf").with_created_at(5),
        Document::folder("vize", "Vize", "y2023").with_created_at(6),
        Document::file("vize1", "Vize 1.pdf", "vize", "https://files/vize1.pdf").with_created_at(7),
        Document::folder("toplanti", "Toplantılar", "komiteler")
            .with_created_at(8)
            .with_tag("ieee"),
    ]
}

pub fn catalog_resources() -> Vec<Resource> {
    vec![
        Resource::new("a", "CMPE150", "Ders Notu", "2023 Güz")
            .with_course_name("Introduction to Computing"),
        Resource::new("b", "CMPE150", "Final Soruları", "2023 Güz"),
        Resource::new("c", "MATH101", "Ders Notu", "2024 Bahar").with_course_name("Calculus I"),
        Resource::new("d", "ÇEV201", "Proje", "2024 Bahar"),
    ]
}

pub struct Fixture {
    pub documents: MemoryCollection<Document>,
    pub resources: MemoryCollection<Resource>,
    pub engine: ArchiveEngine,
}

pub fn fixture() -> Fixture {
    fixture_with(archive_documents(), catalog_resources())
}

pub fn fixture_with(documents: Vec<Document>, resources: Vec<Resource>) -> Fixture {
    let documents = MemoryCollection::with_records(DOCUMENTS_COLLECTION, documents);
    let resources = MemoryCollection::with_records(RESOURCES_COLLECTION, resources);
    let engine = ArchiveEngine::new(
        EngineConfig::default(),
        CacheLayer::in_memory(),
        documents.clone(),
        resources.clone(),
    );
    Fixture {
        documents,
        resources,
        engine,
    }
}

pub fn ids(documents: &[Document]) -> Vec<&str> {
    documents.iter().map(|d| d.id.as_str()).collect()
}
