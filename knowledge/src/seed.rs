//! Built-in starter knowledge
//!
//! Seeded into an empty collection on first run so retrieval has something to
//! match before any solutions have been learned.

use crate::embedder::Embedder;
use crate::error::Result;
use crate::knowledge_base::KnowledgeBase;
use crate::store::VectorStore;
use crate::types::Metadata;
use tracing::info;

/// Starter document
#[derive(Debug, Clone, PartialEq)]
pub struct SeedDocument {
    pub content: &'static str,
    pub metadata: &'static [(&'static str, &'static str)],
}

impl SeedDocument {
    fn metadata(&self) -> Metadata {
        self.metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

const SEED_DOCUMENTS: &[SeedDocument] = &[
    SeedDocument {
        content: "Common build error: dependency download failed
Solution:
1. Check network connectivity to the package mirror: ping registry.npmjs.org
2. Point npm at a reachable mirror: npm config set registry https://registry.npmmirror.com/
3. Clear the local cache: npm cache clean --force
4. Retry the build",
        metadata: &[
            ("source", "manual"),
            ("error_type", "dependency"),
            ("keywords", "npm dependency download failed"),
        ],
    },
    SeedDocument {
        content: "Docker build error: permission denied
Solution:
1. Check the Docker service: systemctl status docker
2. Add the build user to the docker group: sudo usermod -aG docker $USER
3. Log out and back in for the group change to apply
4. Check push/pull permissions on the image registry",
        metadata: &[
            ("source", "manual"),
            ("error_type", "permission"),
            ("keywords", "docker, permission denied"),
        ],
    },
    SeedDocument {
        content: "Maven build error: out of memory
Solution:
1. Raise the Maven heap: export MAVEN_OPTS=\"-Xmx2048m -Xms1024m\"
2. Skip tests to reduce peak memory: mvn clean install -DskipTests
3. Use incremental compilation
4. Review the JVM settings of the build agent",
        metadata: &[
            ("source", "manual"),
            ("error_type", "resource"),
            ("keywords", "maven memory out of memory"),
        ],
    },
    SeedDocument {
        content: "When npm install fails, try: 1. clear the cache with npm cache clean 2. switch to a closer registry mirror",
        metadata: &[("type", "example")],
    },
    SeedDocument {
        content: "Docker permission error: add the user to the docker group: sudo usermod -aG docker $USER",
        metadata: &[("type", "example")],
    },
    SeedDocument {
        content: "Out of memory: increase Maven memory: export MAVEN_OPTS='-Xmx2048m -Xms1024m'",
        metadata: &[("type", "example")],
    },
];

/// All built-in starter documents
pub fn seed_documents() -> &'static [SeedDocument] {
    SEED_DOCUMENTS
}

/// Ingest the starter documents if the collection is empty
///
/// Returns the number of documents ingested (0 when the collection already
/// had content).
pub fn seed_if_empty<E: Embedder, S: VectorStore>(kb: &mut KnowledgeBase<E, S>) -> Result<usize> {
    let existing = kb.count()?;
    if existing > 0 {
        info!("Knowledge base already holds {} documents, not seeding", existing);
        return Ok(0);
    }

    info!("Seeding knowledge base with {} documents", SEED_DOCUMENTS.len());
    for doc in SEED_DOCUMENTS {
        kb.ingest(doc.content, doc.metadata())?;
    }
    Ok(SEED_DOCUMENTS.len())
}
