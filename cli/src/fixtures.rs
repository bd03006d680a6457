#![cfg(test)]

use userdir_business::User;

pub fn sample_user(id: i64, name: &str, email: &str) -> User {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "username": "Antonette",
        "email": email,
        "address": {
            "street": "Victor Plains",
            "suite": "Suite 879",
            "city": "Wisokyburgh",
            "zipcode": "90566-7771",
            "geo": { "lat": "-43.9509", "lng": "-34.4618" }
        },
        "phone": "010-692-6593 x09125",
        "website": "anastasia.net",
        "company": {
            "name": "Deckow-Crist",
            "catchPhrase": "Proactive didactic contingency",
            "bs": "synergize scalable supply-chains"
        }
    }))
    .unwrap()
}
