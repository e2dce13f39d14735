use super::{App, Report, Step};
use crate::cloud::Cloud;
use crate::error::Error;
use crate::resolver::{LaunchServerArgs, Positional};

impl<C: Cloud> App<C> {
    /// Starts a language's interop server container on a host, replacing
    /// any previous one.
    pub async fn launch_server(&self, raw: &[String]) -> Result<Report, Error> {
        let func = LaunchServerArgs::FUNC;
        let resolved = self.resolve::<LaunchServerArgs>(raw)?;
        self.ensure_ssh_key().await?;

        let LaunchServerArgs { host, server } = resolved.args;
        self.find_instance(func, &resolved.ctx, &host).await?;

        let command = self.registry.server(server)?.command();
        self.finish(func, &resolved.ctx, vec![Step::Run { host, command }])
            .await
    }
}
