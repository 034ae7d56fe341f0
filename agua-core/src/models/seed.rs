//! Demo data written to a collection the first time it is read on a
//! fresh device.

use crate::record::Collection;

use super::{
    to_record, ActiveStatus, Entity, House, Invoice, InvoiceStatus, Leak, LeakSeverity,
    LeakStatus, LeakType, Reading, ReadingStatus, User, UserRole,
};

/// Default contents for `name`. Unknown collections start empty.
pub fn defaults_for(name: &str) -> Collection {
    match name {
        House::COLLECTION => records(&houses()),
        User::COLLECTION => records(&users()),
        Reading::COLLECTION => records(&readings()),
        Invoice::COLLECTION => records(&invoices()),
        Leak::COLLECTION => records(&leaks()),
        _ => Vec::new(),
    }
}

pub(crate) fn records<E: Entity>(entities: &[E]) -> Collection {
    // Every model serializes to an object, so nothing is dropped here.
    entities.iter().filter_map(|e| to_record(e).ok()).collect()
}

pub fn users() -> Vec<User> {
    let mut admin = User::new(
        "A106",
        "Vicente Dias (Admin)",
        "admin@diasexpress.co.mz",
        "A106",
        UserRole::Admin,
    );
    admin.avatar = Some(
        "https://ui-avatars.com/api/?name=Vicente+Dias&background=0F172A&color=fff".to_string(),
    );

    vec![
        admin,
        User::new(
            "u2",
            "João Leitor",
            "joao@diasexpress.co.mz",
            "840000001",
            UserRole::Reader,
        ),
        User::new(
            "u3",
            "Carlos Técnico",
            "carlos@diasexpress.co.mz",
            "840000002",
            UserRole::Technician,
        ),
    ]
}

pub fn houses() -> Vec<House> {
    let mut maria = House::new("A113", "Maria Santos", "845551234", "CNT-001")
        .with_reference("Próximo ao Salão da Dona Ana, Portão Azul")
        .with_last_reading(150.0, "2026-01-05");
    maria.secondary_phone = Some("821112222".to_string());
    maria.password = Some("Welcome26".to_string());

    let mut jose = House::new("A106789", "José Malangatana", "849990000", "CNT-002")
        .with_reference("Perto da Igreja Santa Isabel")
        .with_last_reading(320.0, "2026-01-10");
    jose.password = Some("password123".to_string());

    vec![maria, jose]
}

pub fn readings() -> Vec<Reading> {
    vec![Reading {
        id: "R-001".to_string(),
        house_id: "A113".to_string(),
        previous_value: 130.0,
        current_value: 150.0,
        consumption: 20.0,
        photo_url: None,
        status: ReadingStatus::Pending,
        date: "2026-01-05".to_string(),
        reader_id: "u2".to_string(),
        updated_at: None,
    }]
}

pub fn invoices() -> Vec<Invoice> {
    let invoice = |id: &str,
                   reading: &str,
                   number: &str,
                   month: &str,
                   amount: f64,
                   taxes: f64,
                   due: &str| Invoice {
        id: id.to_string(),
        house_id: "A113".to_string(),
        reading_id: reading.to_string(),
        invoice_number: number.to_string(),
        month: month.to_string(),
        year: 2026,
        amount,
        taxes,
        total: amount + taxes,
        status: InvoiceStatus::Pending,
        due_date: due.to_string(),
        pdf_url: None,
        updated_at: None,
    };

    vec![
        invoice("INV-001", "R-001", "AM-202601-001", "Janeiro", 500.0, 85.0, "2026-01-15"),
        invoice("INV-002", "R-002", "AM-202602-001", "Fevereiro", 600.0, 102.0, "2026-02-15"),
    ]
}

pub fn leaks() -> Vec<Leak> {
    vec![Leak {
        id: "L-001".to_string(),
        house_id: None,
        reporter_id: "A113".to_string(),
        leak_type: LeakType::Public,
        location: "Rua das Flores, esquina com Mercado Kampos".to_string(),
        latitude: None,
        longitude: None,
        description: "Ruptura na tubagem principal da estrada.".to_string(),
        severity: LeakSeverity::High,
        photos: vec!["https://picsum.photos/seed/leak1/400/300".to_string()],
        status: LeakStatus::Reported,
        technician_id: None,
        reported_at: "2026-02-15T10:00:00Z".to_string(),
        updated_at: None,
    }]
}
