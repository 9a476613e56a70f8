use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SpeedRuns {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Donations {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Bids {
    Table,
    Id,
    EventId,
    SpeedrunId,
    ParentId,
    Name,
    Description,
    Goal,
    IsTarget,
    AllowUserOptions,
    State,
    Total,
    Count,
}

#[derive(DeriveIden)]
enum DonationBids {
    Table,
    Id,
    DonationId,
    BidId,
    Amount,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bids::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bids::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bids::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Bids::SpeedrunId).big_integer().null())
                    .col(ColumnDef::new(Bids::ParentId).big_integer().null())
                    .col(ColumnDef::new(Bids::Name).string().not_null())
                    .col(
                        ColumnDef::new(Bids::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Bids::Goal).decimal_len(20, 2).null())
                    .col(
                        ColumnDef::new(Bids::IsTarget)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Bids::AllowUserOptions)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Bids::State)
                            .string_len(32)
                            .not_null()
                            .default("OPENED"),
                    )
                    .col(
                        ColumnDef::new(Bids::Total)
                            .decimal_len(20, 2)
                            .not_null()
                            .default("0.00"),
                    )
                    .col(
                        ColumnDef::new(Bids::Count)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bid_event")
                            .from(Bids::Table, Bids::EventId)
                            .to(Events::Table, Events::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bid_speedrun")
                            .from(Bids::Table, Bids::SpeedrunId)
                            .to(SpeedRuns::Table, SpeedRuns::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bid_parent")
                            .from(Bids::Table, Bids::ParentId)
                            .to(Bids::Table, Bids::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bids_event_name_parent_unique")
                    .table(Bids::Table)
                    .col(Bids::EventId)
                    .col(Bids::Name)
                    .col(Bids::ParentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bids_parent")
                    .table(Bids::Table)
                    .col(Bids::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DonationBids::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DonationBids::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DonationBids::DonationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DonationBids::BidId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DonationBids::Amount)
                            .decimal_len(20, 2)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_bid_donation")
                            .from(DonationBids::Table, DonationBids::DonationId)
                            .to(Donations::Table, Donations::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_donation_bid_bid")
                            .from(DonationBids::Table, DonationBids::BidId)
                            .to(Bids::Table, Bids::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // one allocation per (donation, bid); re-allocating updates in place
        manager
            .create_index(
                Index::create()
                    .name("idx_donation_bids_donation_bid_unique")
                    .table(DonationBids::Table)
                    .col(DonationBids::DonationId)
                    .col(DonationBids::BidId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_donation_bids_bid")
                    .table(DonationBids::Table)
                    .col(DonationBids::BidId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DonationBids::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Bids::Table).to_owned())
            .await?;
        Ok(())
    }
}
