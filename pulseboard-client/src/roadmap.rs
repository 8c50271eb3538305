use crate::{
    api::{
        Direction, EntityKind, Error, NewRoadmapItem, Notifier, Query, Record, RecordId,
        RecordStore, RoadmapItem, RoadmapUpdate,
    },
    fields::{self, column},
    Client,
};

const KIND: EntityKind = EntityKind::Roadmap;

pub(crate) fn from_record(r: &Record) -> Result<RoadmapItem, Error> {
    Ok(RoadmapItem {
        id: r.id()?,
        title: fields::title(r)?,
        description: fields::text(r, "description")?,
        timeline: fields::text(r, "timeline")?,
        status: fields::text(r, "status")?,
        estimated_date: fields::text(r, "estimated_date")?,
        votes: fields::integer(r, "votes")?.unwrap_or(0),
        linked_feedback_ids: fields::embedded(r, "linked_feedback_ids")?.unwrap_or_default(),
    })
}

fn create_fields(new: &NewRoadmapItem) -> Result<Record, Error> {
    let mut f = Record::new();
    fields::set_title(&mut f, &new.title);
    fields::set_opt(&mut f, "description", new.description.as_ref());
    f.set(
        column("timeline"),
        new.timeline
            .as_deref()
            .unwrap_or(NewRoadmapItem::DEFAULT_TIMELINE),
    );
    f.set(
        column("status"),
        new.status.as_deref().unwrap_or(NewRoadmapItem::DEFAULT_STATUS),
    );
    fields::set_opt(&mut f, "estimated_date", new.estimated_date.as_ref());
    f.set(column("votes"), new.votes);
    f.set_embedded(&column("linked_feedback_ids"), &new.linked_feedback_ids)?;
    Ok(f)
}

fn update_fields(patch: &RoadmapUpdate) -> Result<Record, Error> {
    let mut f = Record::new();
    if let Some(title) = &patch.title {
        fields::set_title(&mut f, title);
    }
    fields::set_opt(&mut f, "description", patch.description.as_ref());
    fields::set_opt(&mut f, "timeline", patch.timeline.as_ref());
    fields::set_opt(&mut f, "status", patch.status.as_ref());
    fields::set_opt(&mut f, "estimated_date", patch.estimated_date.as_ref());
    if let Some(votes) = patch.votes {
        f.set(column("votes"), votes);
    }
    if let Some(ids) = &patch.linked_feedback_ids {
        f.set_embedded(&column("linked_feedback_ids"), ids)?;
    }
    Ok(f)
}

pub struct RoadmapService<'a, S, N> {
    client: &'a Client<S, N>,
}

impl<'a, S: RecordStore, N: Notifier> RoadmapService<'a, S, N> {
    pub(crate) fn new(client: &'a Client<S, N>) -> Self {
        RoadmapService { client }
    }

    async fn query(&self, query: Query) -> Result<Vec<RoadmapItem>, Error> {
        self.client
            .store()
            .fetch_many(KIND, &query)
            .await?
            .iter()
            .map(from_record)
            .collect()
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<RoadmapItem>, Error> {
        let res = self
            .query(Query::all().order_by("Id", Direction::Descending))
            .await;
        self.client.reported("fetching roadmap", res)
    }

    pub async fn get(&self, id: RecordId) -> Result<RoadmapItem, Error> {
        let res: Result<RoadmapItem, Error> =
            async { from_record(&self.client.store().fetch_one(KIND, id).await?) }.await;
        self.client
            .reported(&format!("fetching roadmap item {id}"), res)
    }

    /// Items planned for `timeline`, newest first
    pub async fn by_timeline(&self, timeline: &str) -> Result<Vec<RoadmapItem>, Error> {
        let query = Query::all()
            .filter(column("timeline"), timeline)
            .order_by("Id", Direction::Descending);
        let res = self.query(query).await;
        self.client
            .reported(&format!("fetching {timeline} roadmap"), res)
    }

    pub async fn create(&self, new: NewRoadmapItem) -> Result<RoadmapItem, Error> {
        let res: Result<RoadmapItem, Error> = async {
            let fields = create_fields(&new)?;
            from_record(&self.client.store().create_one(KIND, fields).await?)
        }
        .await;
        let item = self.client.reported("creating roadmap item", res)?;
        self.client
            .succeeded(&format!("Roadmap item {} created", item.id));
        Ok(item)
    }

    pub async fn update(&self, id: RecordId, patch: RoadmapUpdate) -> Result<RoadmapItem, Error> {
        let res: Result<RoadmapItem, Error> = async {
            let fields = update_fields(&patch)?;
            from_record(&self.client.store().update_one(KIND, id, fields).await?)
        }
        .await;
        let item = self
            .client
            .reported(&format!("updating roadmap item {id}"), res)?;
        self.client.succeeded(&format!("Roadmap item {id} updated"));
        Ok(item)
    }

    pub async fn delete(&self, id: RecordId) -> Result<bool, Error> {
        let res = self.client.store().delete_one(KIND, id).await;
        let deleted = self
            .client
            .reported(&format!("deleting roadmap item {id}"), res)?;
        if deleted {
            self.client.succeeded(&format!("Roadmap item {id} deleted"));
        }
        Ok(deleted)
    }
}
