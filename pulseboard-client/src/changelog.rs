use chrono::SecondsFormat;

use crate::{
    api::{
        ChangelogEntry, ChangelogUpdate, Direction, EntityKind, Error, NewChangelogEntry,
        Notifier, Query, Record, RecordId, RecordStore, Time,
    },
    fields::{self, column},
    Client,
};

const KIND: EntityKind = EntityKind::Changelog;

pub(crate) fn from_record(r: &Record) -> Result<ChangelogEntry, Error> {
    Ok(ChangelogEntry {
        id: r.id()?,
        title: fields::title(r)?,
        description: fields::text(r, "description")?,
        release_date: fields::time(r, "release_date")?,
        kind: fields::text(r, "type")?,
        version: fields::text(r, "version")?,
    })
}

fn date(t: &Time) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn create_fields(new: &NewChangelogEntry, now: Time) -> Record {
    let mut f = Record::new();
    fields::set_title(&mut f, &new.title);
    fields::set_opt(&mut f, "description", new.description.as_ref());
    f.set(
        column("release_date"),
        date(new.release_date.as_ref().unwrap_or(&now)),
    );
    f.set(
        column("type"),
        new.kind.as_deref().unwrap_or(NewChangelogEntry::DEFAULT_KIND),
    );
    fields::set_opt(&mut f, "version", new.version.as_ref());
    f
}

fn update_fields(patch: &ChangelogUpdate) -> Record {
    let mut f = Record::new();
    if let Some(title) = &patch.title {
        fields::set_title(&mut f, title);
    }
    fields::set_opt(&mut f, "description", patch.description.as_ref());
    if let Some(t) = &patch.release_date {
        f.set(column("release_date"), date(t));
    }
    fields::set_opt(&mut f, "type", patch.kind.as_ref());
    fields::set_opt(&mut f, "version", patch.version.as_ref());
    f
}

pub struct ChangelogService<'a, S, N> {
    client: &'a Client<S, N>,
}

impl<'a, S: RecordStore, N: Notifier> ChangelogService<'a, S, N> {
    pub(crate) fn new(client: &'a Client<S, N>) -> Self {
        ChangelogService { client }
    }

    async fn query(&self, query: Query) -> Result<Vec<ChangelogEntry>, Error> {
        self.client
            .store()
            .fetch_many(KIND, &query)
            .await?
            .iter()
            .map(from_record)
            .collect()
    }

    /// Most recent release first
    pub async fn list(&self) -> Result<Vec<ChangelogEntry>, Error> {
        let query = Query::all().order_by(column("release_date"), Direction::Descending);
        let res = self.query(query).await;
        self.client.reported("fetching changelog", res)
    }

    pub async fn get(&self, id: RecordId) -> Result<ChangelogEntry, Error> {
        let res = match self.client.store().fetch_one(KIND, id).await {
            Ok(r) => from_record(&r),
            Err(e) => Err(e),
        };
        self.client
            .reported(&format!("fetching changelog entry {id}"), res)
    }

    /// Entries released as `version`, most recent first
    pub async fn by_version(&self, version: &str) -> Result<Vec<ChangelogEntry>, Error> {
        let query = Query::all()
            .filter(column("version"), version)
            .order_by(column("release_date"), Direction::Descending);
        let res = self.query(query).await;
        self.client
            .reported(&format!("fetching changelog of version {version}"), res)
    }

    pub async fn create(&self, new: NewChangelogEntry) -> Result<ChangelogEntry, Error> {
        let fields = create_fields(&new, chrono::Utc::now());
        let res = match self.client.store().create_one(KIND, fields).await {
            Ok(r) => from_record(&r),
            Err(e) => Err(e),
        };
        let entry = self.client.reported("creating changelog entry", res)?;
        self.client
            .succeeded(&format!("Changelog entry {} created", entry.id));
        Ok(entry)
    }

    pub async fn update(
        &self,
        id: RecordId,
        patch: ChangelogUpdate,
    ) -> Result<ChangelogEntry, Error> {
        let res = match self
            .client
            .store()
            .update_one(KIND, id, update_fields(&patch))
            .await
        {
            Ok(r) => from_record(&r),
            Err(e) => Err(e),
        };
        let entry = self
            .client
            .reported(&format!("updating changelog entry {id}"), res)?;
        self.client
            .succeeded(&format!("Changelog entry {id} updated"));
        Ok(entry)
    }

    pub async fn delete(&self, id: RecordId) -> Result<bool, Error> {
        let res = self.client.store().delete_one(KIND, id).await;
        let deleted = self
            .client
            .reported(&format!("deleting changelog entry {id}"), res)?;
        if deleted {
            self.client
                .succeeded(&format!("Changelog entry {id} deleted"));
        }
        Ok(deleted)
    }
}
