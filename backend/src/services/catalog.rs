//! The fixed catalogue of services shown on the public site.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceOffering {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
}

pub const SERVICES: [ServiceOffering; 3] = [
    ServiceOffering {
        id: 1,
        name: "Reparo de placa",
        description: "Diagnóstico e troca de componentes em placas",
    },
    ServiceOffering {
        id: 2,
        name: "Limpeza e manutenção",
        description: "Limpeza interna e manutenção preventiva",
    },
    ServiceOffering {
        id: 3,
        name: "Substituição de peças",
        description: "Troca de peças com garantia",
    },
];

pub fn catalog() -> &'static [ServiceOffering] {
    &SERVICES
}
