mod query_api;
mod ride_api;

use oso::Oso;

use crate::{api::API, auth::authorizor, db::RideStore, error::Error};

pub struct Engine<S> {
    store: S,
    authorizor: Oso,
}

impl<S: RideStore> Engine<S> {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(store: S) -> Result<Self, Error> {
        Ok(Self {
            store,
            authorizor: authorizor::new()?,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> Engine<S> {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(Error::Forbidden)
    }
}

impl<S: RideStore> API for Engine<S> {}
